use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use naia_serde::{BitReader, BitWrite, Serde, SerdeErr};

/// A socket address on the wire: `[family 4|6][octets][port]`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WireAddress(pub SocketAddr);

impl Serde for WireAddress {
    fn ser(&self, writer: &mut dyn BitWrite) {
        match self.0.ip() {
            IpAddr::V4(ip) => {
                4_u8.ser(writer);
                for octet in ip.octets() {
                    octet.ser(writer);
                }
            }
            IpAddr::V6(ip) => {
                6_u8.ser(writer);
                for octet in ip.octets() {
                    octet.ser(writer);
                }
            }
        }
        self.0.port().ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let ip = match u8::de(reader)? {
            4 => {
                let mut octets = [0_u8; 4];
                for octet in octets.iter_mut() {
                    *octet = u8::de(reader)?;
                }
                IpAddr::V4(Ipv4Addr::from(octets))
            }
            6 => {
                let mut octets = [0_u8; 16];
                for octet in octets.iter_mut() {
                    *octet = u8::de(reader)?;
                }
                IpAddr::V6(Ipv6Addr::from(octets))
            }
            _ => return Err(SerdeErr),
        };
        let port = u16::de(reader)?;
        Ok(Self(SocketAddr::new(ip, port)))
    }

    fn bit_length(&self) -> u32 {
        let octets: u32 = match self.0.ip() {
            IpAddr::V4(_) => 4,
            IpAddr::V6(_) => 16,
        };
        8 + octets * 8 + 16
    }
}
