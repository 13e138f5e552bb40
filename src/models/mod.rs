// Data models for CoffeeCup API payloads

pub mod coffeecup;

pub use coffeecup::{Client, Project, SimpleUser, TimeEntry, User};
