pub mod equipment;
pub mod feeder;

pub use equipment::{
    AttrPair, EquipmentRecord, EquipmentType, SubRecord, SUB_RECORD_KEYS, guard_payload_shape,
};
pub use feeder::{FEEDER_CATALOG, Feeder, VoltageLevel};
