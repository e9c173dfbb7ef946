use std::sync::Arc;

use crate::application::subscriptions::SubscriptionService;

#[derive(Clone)]
pub struct ApiState {
    pub subscriptions: Arc<SubscriptionService>,
}

impl ApiState {
    pub fn new(subscriptions: SubscriptionService) -> Self {
        Self {
            subscriptions: Arc::new(subscriptions),
        }
    }
}
