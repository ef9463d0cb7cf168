use clap::Args;

pub const DEFAULT_CONTROLLER_NAME: &str = "gateway-status.io/controller";
pub const DEFAULT_NAMESPACE: &str = "default";

#[derive(Clone, Debug, Args)]
pub struct Settings {
    /// Controller name written to the route parent statuses this controller
    /// creates.
    #[clap(
        long,
        default_value = DEFAULT_CONTROLLER_NAME,
        env = "GATEWAY_STATUS_CONTROLLER_NAME"
    )]
    pub controller_name: String,

    /// Namespace assumed for parent references that omit one, and for routes
    /// that have none.
    #[clap(long, default_value = DEFAULT_NAMESPACE)]
    pub default_namespace: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            controller_name: DEFAULT_CONTROLLER_NAME.to_string(),
            default_namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}
