pub mod descriptor;
pub mod loopback;
#[cfg(test)]
pub mod loopback_test;
pub mod request;
pub mod stack;
