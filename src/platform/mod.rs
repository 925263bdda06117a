// Integrations with components outside the trainer

pub mod pose;
