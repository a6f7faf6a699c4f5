pub mod generated_question;
pub mod question;
pub mod quiz;
pub mod quiz_response;
