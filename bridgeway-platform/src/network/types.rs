//! Connection taxonomy shared with the engine.

use std::fmt;

/// Kind of the active network link.
///
/// The numeric codes are what the engine expects on its side of the bridge.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum ConnectionType {
    /// Mobile data.
    Cellular = 0,
    /// Bluetooth tethering.
    Bluetooth = 1,
    /// Wired ethernet.
    Ethernet = 2,
    /// Wi-Fi.
    Wifi = 3,
    /// Any other transport.
    Other = 4,
    /// No active network.
    None = 5,
}

impl ConnectionType {
    /// Code used by the engine for this type.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns whether this is a Wi-Fi link.
    pub const fn is_wifi(self) -> bool {
        matches!(self, ConnectionType::Wifi)
    }
}

/// Finer classification of the active link.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ConnectionSubType {
    /// GPRS, EDGE, CDMA and friends.
    Cell2g,
    /// UMTS, HSPA, EV-DO and friends.
    Cell3g,
    /// LTE.
    Cell4g,
    /// Wired ethernet.
    Ethernet,
    /// Wi-Fi.
    Wifi,
    /// WiMAX.
    Wimax,
    /// Not known.
    Unknown,
}

impl ConnectionSubType {
    /// Lowercase name used by the engine.
    pub const fn as_str(self) -> &'static str {
        match self {
            ConnectionSubType::Cell2g => "2g",
            ConnectionSubType::Cell3g => "3g",
            ConnectionSubType::Cell4g => "4g",
            ConnectionSubType::Ethernet => "ethernet",
            ConnectionSubType::Wifi => "wifi",
            ConnectionSubType::Wimax => "wimax",
            ConnectionSubType::Unknown => "unknown",
        }
    }

    /// Maps an Android `TelephonyManager.NETWORK_TYPE_*` code to a cellular
    /// generation.
    pub const fn from_telephony_type(network_type: i32) -> ConnectionSubType {
        match network_type {
            // GPRS, EDGE, CDMA, 1xRTT, IDEN, GSM
            1 | 2 | 4 | 7 | 11 | 16 => ConnectionSubType::Cell2g,
            // UMTS, EVDO_0, EVDO_A, HSDPA, HSUPA, HSPA, EVDO_B, EHRPD, HSPAP, TD_SCDMA
            3 | 5 | 6 | 8 | 9 | 10 | 12 | 14 | 15 | 17 => ConnectionSubType::Cell3g,
            // LTE, IWLAN, LTE_CA
            13 | 18 | 19 => ConnectionSubType::Cell4g,
            _ => ConnectionSubType::Unknown,
        }
    }
}

/// Whether the network is reachable.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NetworkStatus {
    /// Connected.
    Up,
    /// Disconnected.
    Down,
    /// Not known.
    Unknown,
}

impl NetworkStatus {
    /// Lowercase name used by the engine.
    pub const fn as_str(self) -> &'static str {
        match self {
            NetworkStatus::Up => "up",
            NetworkStatus::Down => "down",
            NetworkStatus::Unknown => "unknown",
        }
    }
}

/// Status notification sent to the engine.
///
/// `Changed` reports a link change that left the status itself unchanged.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StatusSignal {
    /// The network came up.
    Up,
    /// The network went down.
    Down,
    /// The status became unknown.
    Unknown,
    /// The link changed, the status did not.
    Changed,
}

impl StatusSignal {
    /// Lowercase name used by the engine.
    pub const fn as_str(self) -> &'static str {
        match self {
            StatusSignal::Up => "up",
            StatusSignal::Down => "down",
            StatusSignal::Unknown => "unknown",
            StatusSignal::Changed => "changed",
        }
    }
}

impl From<NetworkStatus> for StatusSignal {
    fn from(status: NetworkStatus) -> Self {
        match status {
            NetworkStatus::Up => StatusSignal::Up,
            NetworkStatus::Down => StatusSignal::Down,
            NetworkStatus::Unknown => StatusSignal::Unknown,
        }
    }
}

impl fmt::Display for StatusSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A connectivity reading.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ConnectionSnapshot {
    /// Kind of the active link.
    pub connection_type: ConnectionType,
    /// Finer classification of the active link.
    pub subtype: ConnectionSubType,
    /// Reachability.
    pub status: NetworkStatus,
}

impl ConnectionSnapshot {
    /// Reading used before the first query and after a failed one.
    pub const UNKNOWN: ConnectionSnapshot = ConnectionSnapshot {
        connection_type: ConnectionType::None,
        subtype: ConnectionSubType::Unknown,
        status: NetworkStatus::Unknown,
    };

    /// Creates a snapshot.
    pub const fn new(
        connection_type: ConnectionType,
        subtype: ConnectionSubType,
        status: NetworkStatus,
    ) -> Self {
        Self {
            connection_type,
            subtype,
            status,
        }
    }

    /// Returns whether the link kind differs from `other`.
    pub fn link_differs(&self, other: &ConnectionSnapshot) -> bool {
        self.connection_type != other.connection_type || self.subtype != other.subtype
    }
}

impl Default for ConnectionSnapshot {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

/// Link description sent to the engine when the link changes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ConnectionChange {
    /// Kind of the active link.
    pub connection_type: ConnectionType,
    /// Finer classification of the active link.
    pub subtype: ConnectionSubType,
    /// Whether the link is Wi-Fi.
    pub is_wifi: bool,
    /// DHCP gateway address of the Wi-Fi link, `0` when unknown.
    pub gateway: u32,
}
