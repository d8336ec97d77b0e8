//! In-process harness for exercising the remote-factory dispatcher
//! without binding a socket, driving the router directly through
//! `tower::ServiceExt::oneshot`.

mod app;

pub use app::{TestApp, TestResponse};
