//! Turns a hostname and credentials into an open configuration session.

use log::{error, info};

use crate::error::ConnectError;
use crate::session::{ConfigSession, Credentials, DeviceConnector};

/// Detects the device type of `hostname`, then opens a session driving it
/// as that type.
///
/// Every failure is logged here and returned to the caller.
pub async fn connect(
    connector: &dyn DeviceConnector,
    hostname: &str,
    credentials: &Credentials,
) -> Result<Box<dyn ConfigSession>, ConnectError> {
    let result = async {
        let device_type = connector.detect_device_type(hostname, credentials).await?;
        info!("{hostname} detected as {device_type}");
        connector
            .open_session(hostname, credentials, device_type)
            .await
    }
    .await;

    if let Err(err) = &result {
        error!("Could not connect to device due to the following error: {err}");
    }
    result
}
