use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, NotificationUnmappedEvent, PaymentReceivedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub payment_received_producer: Vec<EventProducer<PaymentReceivedEvent>>,
    pub notification_unmapped_producer: Vec<EventProducer<NotificationUnmappedEvent>>,
}

pub struct EventHandlers {
    pub on_payment_received: Option<EventHandler<PaymentReceivedEvent>>,
    pub on_notification_unmapped: Option<EventHandler<NotificationUnmappedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_payment_received = hooks.on_payment_received.map(|f| EventHandler::new(buffer_size, f));
        let on_notification_unmapped = hooks.on_notification_unmapped.map(|f| EventHandler::new(buffer_size, f));
        Self { on_payment_received, on_notification_unmapped }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_payment_received {
            result.payment_received_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_notification_unmapped {
            result.notification_unmapped_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_payment_received {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_notification_unmapped {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_payment_received: Option<Handler<PaymentReceivedEvent>>,
    pub on_notification_unmapped: Option<Handler<NotificationUnmappedEvent>>,
}

impl EventHooks {
    pub fn on_payment_received<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentReceivedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payment_received = Some(Arc::new(f));
        self
    }

    pub fn on_notification_unmapped<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(NotificationUnmappedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_notification_unmapped = Some(Arc::new(f));
        self
    }
}
