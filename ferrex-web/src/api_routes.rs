macro_rules! v1_path {
    ($path:literal) => {
        concat!("/api/v1", $path)
    };
}

/// Versioned API routes the web client reads during SSR and hydration
pub mod v1 {
    pub const ROOT: &str = "/api/v1";
    pub const VERSION: &str = "v1";

    pub mod auth {
        pub const REFRESH: &str = v1_path!("/auth/refresh");
    }

    pub mod users {
        pub const CURRENT: &str = v1_path!("/users/me");
    }

    pub mod server {
        /// Instance metadata, readable by guests
        pub const INFO: &str = v1_path!("/server/info");
    }

    pub mod libraries {
        pub const COLLECTION: &str = v1_path!("/libraries");
        pub const ITEM: &str = v1_path!("/libraries/{id}");
        pub const MEDIA: &str = v1_path!("/libraries/{id}/media");
    }
}
