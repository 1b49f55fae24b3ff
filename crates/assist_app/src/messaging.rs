use assist_core::{Message, Response, TabId};
use assist_engine::{Messenger, MessagingError};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

/// Requests from the background to the side of the host that owns the tabs.
#[derive(Debug)]
pub(crate) enum HostEvent {
    TabRequest {
        tab: TabId,
        message: Message,
        reply: oneshot::Sender<Result<Response, MessagingError>>,
    },
    Broadcast(Message),
    PopupOpened,
}

/// [`Messenger`] that hands every delivery to the host loop over a channel.
#[derive(Debug, Clone)]
pub(crate) struct ChannelMessenger {
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl ChannelMessenger {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Messenger for ChannelMessenger {
    async fn send_to_tab(&self, tab: TabId, message: Message) -> Result<Response, MessagingError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(HostEvent::TabRequest {
                tab,
                message,
                reply,
            })
            .map_err(|_| MessagingError::Closed)?;
        response.await.map_err(|_| MessagingError::NoResponse(tab))?
    }

    async fn broadcast(&self, message: Message) -> Result<(), MessagingError> {
        self.tx
            .send(HostEvent::Broadcast(message))
            .map_err(|_| MessagingError::Closed)
    }

    async fn open_popup(&self) -> Result<(), MessagingError> {
        self.tx
            .send(HostEvent::PopupOpened)
            .map_err(|_| MessagingError::PopupUnavailable)
    }
}
