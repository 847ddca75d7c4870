pub mod config;
pub mod domain {
    pub mod card;
    pub mod masking;
    pub mod payment;
    pub mod reference;
    pub mod status;
}
pub mod gateways;
pub mod http {
    pub mod handlers {
        pub mod payments;
    }
    pub mod router;
}
pub mod repo {
    pub mod memory_store;
    pub mod payments_repo;
}
pub mod service {
    pub mod payment_service;
    pub mod settlement;
}

#[derive(Clone)]
pub struct AppState {
    pub payment_service: service::payment_service::PaymentService,
}
