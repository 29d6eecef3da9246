pub mod chat_push;
