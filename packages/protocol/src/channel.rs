use crate::messages::{DesignModeMessage, Envelope};
use tokio::sync::mpsc;
use tracing::warn;

/// One side of the cross-realm boundary.
///
/// Frames are JSON strings; serialization happens on send and validation
/// on receive, so a compromised peer can never hand over anything but a
/// well-formed message. Delivery is at-most-once: if the receiving side is
/// gone (context reloaded mid-flight) the frame is dropped, not retried.
pub struct Endpoint {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

/// Create the two connected endpoints of a design-mode channel.
pub fn channel_pair() -> (Endpoint, Endpoint) {
    let (host_tx, preview_rx) = mpsc::unbounded_channel();
    let (preview_tx, host_rx) = mpsc::unbounded_channel();

    (
        Endpoint {
            tx: host_tx,
            rx: host_rx,
        },
        Endpoint {
            tx: preview_tx,
            rx: preview_rx,
        },
    )
}

impl Endpoint {
    /// Serialize and send a message. A closed peer loses the message
    /// silently (logged); the boundary offers no delivery guarantee.
    pub fn send(&self, message: DesignModeMessage) {
        let envelope = Envelope::new(message);
        let frame = match serde_json::to_string(&envelope) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("failed to serialize envelope: {e}");
                return;
            }
        };

        if self.tx.send(frame).is_err() {
            warn!("peer context gone; message dropped");
        }
    }

    /// Inject a raw frame, bypassing serialization. Used to exercise the
    /// malformed-envelope path.
    pub fn send_raw(&self, frame: impl Into<String>) {
        let _ = self.tx.send(frame.into());
    }

    /// Receive the next well-formed message, dropping (and logging) any
    /// malformed or unknown envelopes in between. Returns `None` once the
    /// peer endpoint is dropped and the queue is drained.
    pub async fn recv(&mut self) -> Option<DesignModeMessage> {
        loop {
            let frame = self.rx.recv().await?;
            match serde_json::from_str::<Envelope>(&frame) {
                Ok(envelope) => return Some(envelope.message),
                Err(e) => {
                    warn!("dropping malformed envelope: {e}");
                }
            }
        }
    }

    /// Non-blocking variant of `recv`.
    pub fn try_recv(&mut self) -> Option<DesignModeMessage> {
        loop {
            match self.rx.try_recv() {
                Ok(frame) => match serde_json::from_str::<Envelope>(&frame) {
                    Ok(envelope) => return Some(envelope.message),
                    Err(e) => {
                        warn!("dropping malformed envelope: {e}");
                    }
                },
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_over_channel() {
        let (host, mut preview) = channel_pair();

        host.send(DesignModeMessage::SetDesignMode { enabled: true });

        assert_eq!(
            preview.recv().await,
            Some(DesignModeMessage::SetDesignMode { enabled: true })
        );
    }

    #[tokio::test]
    async fn test_malformed_frames_dropped_valid_still_delivered() {
        let (host, mut preview) = channel_pair();

        host.send_raw("not json at all");
        host.send_raw(r#"{"type":"noSuchMessage"}"#);
        host.send(DesignModeMessage::RequestElementsState);

        assert_eq!(
            preview.recv().await,
            Some(DesignModeMessage::RequestElementsState)
        );
    }

    #[tokio::test]
    async fn test_send_to_dropped_peer_does_not_panic() {
        let (host, preview) = channel_pair();
        drop(preview);

        host.send(DesignModeMessage::RequestElementsState);
    }

    #[tokio::test]
    async fn test_directions_are_independent() {
        let (mut host, mut preview) = channel_pair();

        host.send(DesignModeMessage::SetDesignMode { enabled: true });
        preview.send(DesignModeMessage::ElementsState { elements: vec![] });

        assert!(matches!(
            preview.recv().await,
            Some(DesignModeMessage::SetDesignMode { .. })
        ));
        assert!(matches!(
            host.recv().await,
            Some(DesignModeMessage::ElementsState { .. })
        ));
    }
}
