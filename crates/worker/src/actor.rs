use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use responder_core::models::{DispatchRequest, DispatchResult, ServiceCategory};
use responder_core::traits::{ResolverEndpoint, ResultSink, ServiceResolver};
use responder_core::{ResponderError, ResponderResult};

#[derive(Debug)]
pub enum ResolverMessage {
    /// Resolve and deliver to the sink; nobody waits for the result.
    Dispatch(DispatchRequest),
    /// Resolve, deliver to the sink and reply with the result.
    Request {
        request: DispatchRequest,
        reply: oneshot::Sender<DispatchResult>,
    },
}

/// Cloneable typed address of a running resolver actor.
#[derive(Debug, Clone)]
pub struct ResolverHandle {
    category: ServiceCategory,
    sender: mpsc::Sender<ResolverMessage>,
}

impl ResolverHandle {
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[async_trait]
impl ResolverEndpoint for ResolverHandle {
    fn category(&self) -> ServiceCategory {
        self.category
    }

    async fn dispatch(&self, request: DispatchRequest) -> ResponderResult<()> {
        self.sender
            .send(ResolverMessage::Dispatch(request))
            .await
            .map_err(|_| ResponderError::ResolverUnavailable {
                category: self.category,
            })
    }

    async fn request(&self, request: DispatchRequest) -> ResponderResult<DispatchResult> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(ResolverMessage::Request { request, reply })
            .await
            .map_err(|_| ResponderError::ResolverUnavailable {
                category: self.category,
            })?;
        response.await.map_err(|_| {
            ResponderError::Internal(format!("{} resolver dropped the request", self.category))
        })
    }
}

/// Owns one resolver's mailbox. Each message is handled in its own task so
/// a slow lookup never delays the next request.
pub struct ResolverActor {
    resolver: Arc<dyn ServiceResolver>,
    sink: Arc<dyn ResultSink>,
    receiver: mpsc::Receiver<ResolverMessage>,
    shutdown_rx: broadcast::Receiver<()>,
    in_flight: JoinSet<()>,
}

impl ResolverActor {
    pub async fn run(mut self) {
        let category = self.resolver.category();
        info!(service = %category, "resolver started");

        loop {
            tokio::select! {
                message = self.receiver.recv() => match message {
                    Some(message) => self.start(message),
                    None => break,
                },
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!(service = %category, error = %e, "resolver task panicked");
                    }
                }
                _ = self.shutdown_rx.recv() => {
                    info!(service = %category, "resolver shutting down");
                    break;
                }
            }
        }

        // Drain whatever was already queued, then wait for in-flight work.
        self.receiver.close();
        while let Some(message) = self.receiver.recv().await {
            self.start(message);
        }
        while let Some(joined) = self.in_flight.join_next().await {
            if let Err(e) = joined {
                error!(service = %category, error = %e, "resolver task panicked");
            }
        }
        info!(service = %category, "resolver stopped");
    }

    fn start(&mut self, message: ResolverMessage) {
        let (request, reply) = match message {
            ResolverMessage::Dispatch(request) => (request, None),
            ResolverMessage::Request { request, reply } => (request, Some(reply)),
        };
        debug!(service = %request.category, request_id = %request.id, "request received");

        let resolver = Arc::clone(&self.resolver);
        let sink = Arc::clone(&self.sink);
        self.in_flight.spawn(async move {
            let result = resolver.handle(request).await;

            if let Some(reply) = reply {
                if reply.send(result.clone()).is_err() {
                    warn!(request_id = %result.request.id, "requester went away before the reply");
                }
            }

            // Delivery runs inside the join set so shutdown drains it.
            if let Err(e) = sink.deliver(&result).await {
                error!(request_id = %result.request.id, error = %e, "result delivery failed");
            }
        });
    }
}

/// Starts an actor for `resolver` and returns its address.
pub fn spawn_resolver(
    resolver: Arc<dyn ServiceResolver>,
    sink: Arc<dyn ResultSink>,
    capacity: usize,
    shutdown_rx: broadcast::Receiver<()>,
) -> (ResolverHandle, JoinHandle<()>) {
    let (sender, receiver) = mpsc::channel(capacity);
    let handle = ResolverHandle {
        category: resolver.category(),
        sender,
    };
    let actor = ResolverActor {
        resolver,
        sink,
        receiver,
        shutdown_rx,
        in_flight: JoinSet::new(),
    };
    (handle, tokio::spawn(actor.run()))
}
