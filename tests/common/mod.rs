#![allow(unused_imports)]

pub use crawlctl_test_utils::builders;
pub use crawlctl_test_utils::{init_tracing, wait_until, with_timeout};
