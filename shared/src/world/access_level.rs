use naia_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr, UnsignedInteger};

/// Which ownership operations are legal for an entity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OwnershipAccessLevel {
    /// Take, release and transfer
    Full,
    TakeObject,
    TransferObject,
    /// Clients may hold it but never hand it back
    ClientOnly,
    ServerOnly,
}

impl OwnershipAccessLevel {
    pub fn allows_take(&self) -> bool {
        matches!(self, OwnershipAccessLevel::Full | OwnershipAccessLevel::TakeObject)
    }

    pub fn allows_release(&self) -> bool {
        *self != OwnershipAccessLevel::ClientOnly
    }

    pub fn allows_transfer(&self) -> bool {
        matches!(
            self,
            OwnershipAccessLevel::Full | OwnershipAccessLevel::TransferObject
        )
    }
}

impl Default for OwnershipAccessLevel {
    fn default() -> Self {
        OwnershipAccessLevel::Full
    }
}

impl Serde for OwnershipAccessLevel {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let index = match self {
            OwnershipAccessLevel::Full => 0,
            OwnershipAccessLevel::TakeObject => 1,
            OwnershipAccessLevel::TransferObject => 2,
            OwnershipAccessLevel::ClientOnly => 3,
            OwnershipAccessLevel::ServerOnly => 4,
        };
        UnsignedInteger::<3>::new(index).ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        match UnsignedInteger::<3>::de(reader)?.get() {
            0 => Ok(OwnershipAccessLevel::Full),
            1 => Ok(OwnershipAccessLevel::TakeObject),
            2 => Ok(OwnershipAccessLevel::TransferObject),
            3 => Ok(OwnershipAccessLevel::ClientOnly),
            4 => Ok(OwnershipAccessLevel::ServerOnly),
            _ => Err(SerdeErr),
        }
    }

    fn bit_length(&self) -> u32 {
        <UnsignedInteger<3> as ConstBitLength>::const_bit_length()
    }
}
