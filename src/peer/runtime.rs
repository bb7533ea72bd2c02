use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::countdown::CountdownHandle;
use super::types::{Agent, Effect, Input};
use crate::config::Timing;
use crate::protocol::Event;

/// A running peer: command it, watch its status, wait for it to leave.
pub struct Peer<A: Agent> {
    inbox: mpsc::UnboundedSender<Input<A::Command>>,
    status: watch::Receiver<A::Status>,
    task: JoinHandle<Result<()>>,
}

impl<A: Agent> Peer<A> {
    pub fn command(&self, command: A::Command) -> Result<()> {
        self.inbox
            .send(Input::Command(command))
            .map_err(|_| anyhow::anyhow!("peer has stopped"))
    }

    pub fn status(&self) -> watch::Receiver<A::Status> {
        self.status.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits until the connection is closed.
    pub async fn join(self) -> Result<()> {
        self.task.await.context("peer task panicked")?
    }
}

/// Connects `agent` to the relay at `url` and runs it on a background task.
pub fn spawn_peer<A: Agent>(agent: A, url: impl Into<String>, timing: Timing) -> Peer<A> {
    let url = url.into();
    let (inbox, receiver) = mpsc::unbounded_channel();
    let (status_tx, status) = watch::channel(agent.status());

    let task = tokio::spawn(run_peer(agent, url, timing, inbox.clone(), receiver, status_tx));

    Peer {
        inbox,
        status,
        task,
    }
}

enum Outbound {
    Paced { event: Event, resume: bool },
    Close,
}

async fn run_peer<A: Agent>(
    mut agent: A,
    url: String,
    timing: Timing,
    inbox: mpsc::UnboundedSender<Input<A::Command>>,
    mut receiver: mpsc::UnboundedReceiver<Input<A::Command>>,
    status: watch::Sender<A::Status>,
) -> Result<()> {
    let (socket, _) = connect_async(url.as_str())
        .await
        .with_context(|| format!("Failed to connect to relay at {}", url))?;
    let (mut write, mut read) = socket.split();

    let role = agent.role();
    tracing::info!("Connected to {}; requesting role \"{}\"", url, role);
    write
        .send(Message::Text(Event::SelectRole(role.to_string()).encode().into()))
        .await
        .context("Failed to send role selection")?;

    let (outbound, mut pending) = mpsc::unbounded_channel::<Outbound>();
    let resume_inbox = inbox.clone();
    let delay = timing.message_delay;
    let pacer = tokio::spawn(async move {
        while let Some(message) = pending.recv().await {
            match message {
                Outbound::Paced { event, resume } => {
                    tokio::time::sleep(delay).await;
                    tracing::debug!("Sending '{}'", event.name());
                    if let Err(e) = write.send(Message::Text(event.encode().into())).await {
                        tracing::warn!("Failed to send '{}': {}", event.name(), e);
                        break;
                    }
                    if resume && resume_inbox.send(Input::Resume).is_err() {
                        break;
                    }
                }
                Outbound::Close => {
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    let mut countdown: Option<CountdownHandle> = None;

    loop {
        let input = tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => match Event::decode(text.as_str()) {
                    Ok(event) => Input::Event(event),
                    Err(e) => {
                        tracing::warn!("Dropping frame from relay: {}", e);
                        continue;
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Relay closed the connection");
                    break;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::warn!("Relay connection failed: {}", e);
                    break;
                }
            },
            Some(input) = receiver.recv() => input,
        };

        let effects = agent.dispatch(input);
        let keep_running = apply(effects, &outbound, &mut countdown, &inbox, &timing);
        status.send_replace(agent.status());

        if !keep_running {
            tracing::info!("Leaving the relay");
            break;
        }
    }

    drop(countdown);
    drop(outbound);
    let _ = pacer.await;
    Ok(())
}

/// Carries out agent effects. Returns `false` once the agent asked to close.
fn apply<C: Send + 'static>(
    effects: Vec<Effect>,
    outbound: &mpsc::UnboundedSender<Outbound>,
    countdown: &mut Option<CountdownHandle>,
    inbox: &mpsc::UnboundedSender<Input<C>>,
    timing: &Timing,
) -> bool {
    let mut keep_running = true;

    for effect in effects {
        match effect {
            Effect::Send(event) => {
                let _ = outbound.send(Outbound::Paced {
                    event,
                    resume: false,
                });
            }
            Effect::SendAndResume(event) => {
                let _ = outbound.send(Outbound::Paced {
                    event,
                    resume: true,
                });
            }
            Effect::StartCountdown { generation } => {
                *countdown = Some(CountdownHandle::start(
                    generation,
                    timing.countdown_interval,
                    inbox.clone(),
                ));
            }
            Effect::CancelCountdown => {
                if let Some(handle) = countdown.take() {
                    handle.cancel();
                }
            }
            Effect::Close => {
                let _ = outbound.send(Outbound::Close);
                keep_running = false;
            }
        }
    }

    keep_running
}
