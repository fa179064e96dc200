pub mod once;
pub mod run;
pub mod secret;
pub mod test_email;
