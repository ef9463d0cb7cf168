//! Condition types and reasons written by the status layer.

pub mod listener {
    pub const PROGRAMMED: &str = "Programmed";
    pub const READY: &str = "Ready";

    pub mod reason {
        pub const INVALID: &str = "Invalid";
        pub const READY: &str = "Ready";
        pub const VALID: &str = "Valid";
    }
}

pub mod route {
    pub const ACCEPTED: &str = "Accepted";

    pub mod reason {
        pub const ACCEPTED: &str = "Accepted";
        pub const NOT_ALLOWED_BY_LISTENERS: &str = "NotAllowedByListeners";
    }
}
