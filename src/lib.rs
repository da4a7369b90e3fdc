pub mod config;
pub mod content;
pub mod error;
pub mod loader;
pub mod state;
pub mod db {
    pub mod models;
    pub mod repository;
}
pub mod search {
    pub mod client;
    pub mod documents;
    pub mod mapping;
    pub mod pipeline;
}

#[cfg(test)]
mod test_support;
