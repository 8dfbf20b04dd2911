pub mod controller;
pub mod dispatch;
pub mod pipeline;
