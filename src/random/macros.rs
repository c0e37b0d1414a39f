/// Use this to define a unique type which names an independent random-number stream.
/// Streams are retrieved with [`stream_rng`](crate::random::stream_rng).
#[macro_export]
macro_rules! define_rng {
    ($random_id:ident) => {
        #[derive(Copy, Clone, Debug)]
        pub struct $random_id;

        impl $crate::random::RngId for $random_id {
            type RngType = $crate::rand::rngs::SmallRng;

            fn get_name() -> &'static str {
                stringify!($random_id)
            }
        }
    };
}
pub use define_rng;
