/// 随机字节源. 密钥生成和OAEP种子都从这里取随机数.
pub trait Rand {
    fn rand(&mut self, random: &mut [u8]);
}

mod default_rand;
pub use default_rand::{DefaultRand, SeededRand};

impl<R: Rand + ?Sized> Rand for &mut R {
    fn rand(&mut self, random: &mut [u8]) {
        (**self).rand(random)
    }
}
