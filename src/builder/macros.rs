//! Macros for declaring state and label enums.

/// Declare a fieldless enum and implement [`Symbol`](crate::core::Symbol) for it.
///
/// The generated enum derives `Clone, Copy, PartialEq, Eq, Hash, Debug` and
/// names each variant after its identifier.
///
/// # Example
///
/// ```
/// use statecraft::core::Symbol;
/// use statecraft::symbol_enum;
///
/// symbol_enum! {
///     pub enum OrderState {
///         Received,
///         Packed,
///         Shipped,
///     }
/// }
///
/// assert_eq!(OrderState::Packed.name(), "Packed");
/// ```
#[macro_export]
macro_rules! symbol_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::Symbol for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}
