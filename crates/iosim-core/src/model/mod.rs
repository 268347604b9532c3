// Domain model: device snapshots, CLI modes, and the topology that ties
// devices together. Everything here is plain data plus validation helpers.

pub mod acl;
pub mod addr;
pub mod device;
pub mod interface;
pub mod mode;
pub mod route;
pub mod routing;
pub mod topology;
pub mod vlan;

pub use acl::{AclAction, AclEntry, AclKind, AclMatch};
pub use addr::{Ipv4Prefix, PrefixParseError};
pub use device::{DEFAULT_HOSTNAME, DeviceConfig, is_valid_hostname};
pub use interface::{
    AclDirection, Interface, InterfaceKind, InterfaceName, SwitchportMode,
    canonical_interface_name, short_interface_name,
};
pub use mode::{Mode, ModeKind};
pub use route::{Route, RouteSource};
pub use routing::{NetworkStatement, RoutingProcess, RoutingProtocol};
pub use topology::{DeviceId, Endpoint, Link, LinkStatus, Topology, TopologyContext};
pub use vlan::{Vlan, VlanId, VlanState};
