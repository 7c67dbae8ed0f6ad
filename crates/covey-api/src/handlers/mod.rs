pub mod accounts;
pub mod health;
pub mod invitations;
pub mod login;
pub mod orders;
pub mod sub_accounts;
