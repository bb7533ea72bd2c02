//! Peer Runtime Tests
//!
//! The socket side is exercised by the integration tests; here we only check the countdown ticker.

#[cfg(test)]
mod tests {
    use crate::peer::Input;
    use crate::peer::countdown::CountdownHandle;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_countdown_ticks_carry_generation() {
        let (inbox, mut receiver) = mpsc::unbounded_channel::<Input<()>>();

        let handle = CountdownHandle::start(7, Duration::from_millis(5), inbox);

        assert_eq!(receiver.recv().await, Some(Input::CountdownTick(7)));
        assert_eq!(receiver.recv().await, Some(Input::CountdownTick(7)));
        assert_eq!(handle.generation(), 7);
    }

    #[tokio::test]
    async fn test_cancel_stops_ticks() {
        let (inbox, mut receiver) = mpsc::unbounded_channel::<Input<()>>();
        let handle = CountdownHandle::start(1, Duration::from_millis(5), inbox);
        receiver.recv().await;

        handle.cancel();

        // The ticker owned the last sender; once aborted the channel closes.
        let drained = tokio::time::timeout(Duration::from_secs(1), async {
            while receiver.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
    }

    #[tokio::test]
    async fn test_drop_stops_ticks() {
        let (inbox, mut receiver) = mpsc::unbounded_channel::<Input<()>>();
        let handle = CountdownHandle::start(2, Duration::from_millis(5), inbox);

        drop(handle);

        let drained = tokio::time::timeout(Duration::from_secs(1), async {
            while receiver.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
    }
}
