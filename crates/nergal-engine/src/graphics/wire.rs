//! Enums that travel through command streams as `u32`.

/// Declares a `#[repr(u32)]` enum with a checked `TryFrom<u32>` decoder.
///
/// Decoding an unknown value yields `GraphicsError::InvalidEnum` naming the type.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $name {
            #[inline]
            pub const fn to_wire(self) -> u32 {
                self as u32
            }
        }

        impl TryFrom<u32> for $name {
            type Error = $crate::graphics::GraphicsError;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                match value {
                    $( $value => Ok(Self::$variant), )+
                    _ => Err($crate::graphics::GraphicsError::InvalidEnum {
                        what: stringify!($name),
                        value,
                    }),
                }
            }
        }
    };
}

pub(crate) use wire_enum;
