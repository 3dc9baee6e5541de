pub mod guard;
pub mod jwt;
pub mod mail;
pub mod pwd;
pub mod record_id;
pub mod time;
pub mod token;
pub mod validated_form;
pub mod validator;
