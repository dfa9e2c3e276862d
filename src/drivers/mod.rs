pub mod xinput;
