pub mod descriptor;
#[cfg(test)]
pub mod descriptor_test;
pub mod driver;
pub mod report;
#[cfg(test)]
pub mod report_test;
