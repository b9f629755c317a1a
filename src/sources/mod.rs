pub mod players;
pub mod prices;
pub mod steam;
pub mod steamspy;
