use naia_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr, UnsignedInteger};

/// A peer's local authority over one entity. `Both` runs local simulation and
/// also accepts remote state, so it counts as active and as passive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BehaviorMode {
    ActiveOnly,
    PassiveOnly,
    Both,
}

impl BehaviorMode {
    pub fn is_active(&self) -> bool {
        matches!(self, BehaviorMode::ActiveOnly | BehaviorMode::Both)
    }

    pub fn is_passive(&self) -> bool {
        matches!(self, BehaviorMode::PassiveOnly | BehaviorMode::Both)
    }
}

impl Serde for BehaviorMode {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let index = match self {
            BehaviorMode::ActiveOnly => 0,
            BehaviorMode::PassiveOnly => 1,
            BehaviorMode::Both => 2,
        };
        UnsignedInteger::<2>::new(index).ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        match UnsignedInteger::<2>::de(reader)?.get() {
            0 => Ok(BehaviorMode::ActiveOnly),
            1 => Ok(BehaviorMode::PassiveOnly),
            2 => Ok(BehaviorMode::Both),
            _ => Err(SerdeErr),
        }
    }

    fn bit_length(&self) -> u32 {
        <UnsignedInteger<2> as ConstBitLength>::const_bit_length()
    }
}
