//! Helper macro for generating port error enums.
//!
//! Each variant gets a snake-case constructor whose fields accept
//! `impl Into<T>`, so adapters can write `RatingRepositoryError::transport("timed out")`.
//! Variants tagged `[transient]` after their message report
//! `is_transient() == true`: the call may succeed if simply repeated, as
//! opposed to a refusal the user has to act on.

macro_rules! define_port_error {
    (@transient transient) => {
        true
    };
    (@transient) => {
        false
    };

    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[doc = concat!("Construct [`Self::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };
    (@ctor $variant:ident { $($field:ident : $ty:ty),* }) => {
        ::paste::paste! {
            #[doc = concat!("Construct [`Self::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )?
                    => $message:literal $([$kind:ident])?
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*

            /// Whether repeating the same call unchanged could succeed.
            #[must_use]
            pub fn is_transient(&self) -> bool {
                match self {
                    $( Self::$variant { .. } => define_port_error!(@transient $($kind)?), )*
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Generated constructors and the transient marker.
    use rstest::rstest;

    define_port_error! {
        pub enum SamplePortError {
            Gone => "gone",
            Transport { message: String } => "transport: {message}" [transient],
            Throttled { retry_after: u32, reason: String }
                => "throttled for {retry_after}s: {reason}" [transient],
        }
    }

    #[rstest]
    fn unit_variants_get_constructors() {
        assert_eq!(SamplePortError::gone(), SamplePortError::Gone);
    }

    #[rstest]
    fn fields_accept_into_and_keep_their_type() {
        let err = SamplePortError::throttled(30_u32, "quota");
        assert_eq!(err.to_string(), "throttled for 30s: quota");
        assert_eq!(
            SamplePortError::transport("reset by peer").to_string(),
            "transport: reset by peer"
        );
    }

    #[rstest]
    #[case(SamplePortError::gone(), false)]
    #[case(SamplePortError::transport("reset"), true)]
    #[case(SamplePortError::throttled(5_u32, "burst"), true)]
    fn only_tagged_variants_are_transient(#[case] err: SamplePortError, #[case] expected: bool) {
        assert_eq!(err.is_transient(), expected);
    }
}
