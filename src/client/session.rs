//! Background driver for a [`SessionController`]
//!
//! [`ClientSession::start`] emits the join, then a task shuttles messages
//! between the transport and the controller. Presentation events arrive on a
//! bounded channel. There is no reconnect: a broken channel produces one
//! [`SessionEvent::ConnectionError`] and the task ends.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use super::controller::{SessionController, SessionEvent};
use super::transport::Transport;
use super::{ClientError, JoinParams};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::types::Member;

const EVENT_CHANNEL_CAPACITY: usize = 256;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

enum Command {
    Send(ClientMessage),
    Shutdown,
}

/// Handle to a running room session
pub struct ClientSession {
    controller: Arc<Mutex<SessionController>>,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl ClientSession {
    /// Validate the join parameters and start the session over `transport`
    pub fn start(
        transport: impl Transport,
        params: JoinParams,
    ) -> Result<(Self, mpsc::Receiver<SessionEvent>), ClientError> {
        params.validate()?;

        let controller = Arc::new(Mutex::new(SessionController::new(params)));
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let task = tokio::spawn(session_loop(
            transport,
            controller.clone(),
            cmd_rx,
            event_tx,
        ));

        Ok((
            Self {
                controller,
                commands: cmd_tx,
                task,
            },
            event_rx,
        ))
    }

    /// Replace the local document and tell the room. Does not wait for
    /// delivery.
    pub async fn edit(&self, content: impl Into<String>) -> Result<(), ClientError> {
        let msg = self
            .controller
            .lock()
            .await
            .local_edit(content)
            .ok_or(ClientError::Closed)?;
        self.commands
            .send(Command::Send(msg))
            .map_err(|_| ClientError::Closed)
    }

    /// Share the latest execution output with the room
    pub async fn share_output(&self, output: impl Into<String>) -> Result<(), ClientError> {
        let msg = self
            .controller
            .lock()
            .await
            .local_output(output)
            .ok_or(ClientError::Closed)?;
        self.commands
            .send(Command::Send(msg))
            .map_err(|_| ClientError::Closed)
    }

    pub async fn document(&self) -> Option<String> {
        self.controller.lock().await.document().map(String::from)
    }

    pub async fn output(&self) -> Option<String> {
        self.controller.lock().await.output().map(String::from)
    }

    pub async fn members(&self) -> Vec<Member> {
        self.controller.lock().await.members().to_vec()
    }

    pub async fn connection_id(&self) -> Option<String> {
        self.controller
            .lock()
            .await
            .connection_id()
            .map(String::from)
    }

    /// Close the channel and stop listening
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        let mut task = self.task;
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut task)
            .await
            .is_err()
        {
            tracing::warn!("Session task did not stop in time, aborting");
            task.abort();
        }
    }
}

async fn send_message(
    transport: &mut impl Transport,
    msg: &ClientMessage,
) -> Result<(), ClientError> {
    let json = serde_json::to_string(msg)?;
    transport.send(json).await
}

/// Presentation events may be dropped under backpressure, connection errors
/// never are.
async fn emit(events: &mpsc::Sender<SessionEvent>, event: SessionEvent) {
    if matches!(event, SessionEvent::ConnectionError { .. }) {
        let _ = events.send(event).await;
        return;
    }
    if let Err(mpsc::error::TrySendError::Full(event)) = events.try_send(event) {
        tracing::warn!("Event channel full, dropping {:?}", event);
    }
}

async fn fail(
    controller: &Mutex<SessionController>,
    events: &mpsc::Sender<SessionEvent>,
    reason: String,
) {
    tracing::error!("Session connection error: {}", reason);
    let event = controller.lock().await.connection_error(reason);
    emit(events, event).await;
}

async fn session_loop(
    mut transport: impl Transport,
    controller: Arc<Mutex<SessionController>>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::Sender<SessionEvent>,
) {
    let join = controller.lock().await.join_message();
    if let Err(e) = send_message(&mut transport, &join).await {
        fail(&controller, &events, e.to_string()).await;
        return;
    }

    loop {
        tokio::select! {
            cmd = commands.recv() => {
                match cmd {
                    Some(Command::Send(msg)) => {
                        if let Err(e) = send_message(&mut transport, &msg).await {
                            fail(&controller, &events, e.to_string()).await;
                            break;
                        }
                    }
                    Some(Command::Shutdown) | None => {
                        controller.lock().await.teardown();
                        let _ = transport.close().await;
                        tracing::debug!("Session shut down");
                        break;
                    }
                }
            }

            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(text)) => {
                        let msg = match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(msg) => msg,
                            Err(e) => {
                                tracing::warn!("Failed to parse server message: {}", e);
                                continue;
                            }
                        };

                        let reaction = controller.lock().await.handle(msg);
                        for out in &reaction.outbound {
                            if let Err(e) = send_message(&mut transport, out).await {
                                tracing::warn!("Failed to send sync reply: {}", e);
                            }
                        }
                        for event in reaction.events {
                            emit(&events, event).await;
                        }
                    }
                    Some(Err(e)) => {
                        fail(&controller, &events, e.to_string()).await;
                        break;
                    }
                    None => {
                        fail(&controller, &events, "Connection closed by server".to_string()).await;
                        break;
                    }
                }
            }
        }
    }
}
