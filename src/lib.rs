// Trail menu bot: inline-keyboard navigation over a static trail catalog
// plus proximity search around a shared user location.

pub mod api;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod geo;
pub mod menu;
pub mod metrics;
pub mod navigator;
pub mod proximity;
pub mod session;
pub mod telegram;
