//! 订单号生成
//!
//! 格式：`ORD-{unix_millis}-{5 位大写字母数字}`，唯一性由 `orders.order_number`
//! 唯一索引保证，冲突时由调用方重试。

use rand::Rng;

const PREFIX: &str = "ORD";
const SUFFIX_LEN: usize = 5;
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{PREFIX}-{}-{suffix}", shared::util::now_millis())
}
