// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Minimal RFC 6238 TOTP check for `/auth/verify-2fa` (spec.md §6). 2FA
//! secret/backup-code *provisioning* is explicitly out of core scope (§1);
//! this is only the verification half the login glue needs. Simplification
//! noted in DESIGN.md: the stored secret is used as the raw HMAC key
//! rather than a base32-encoded string, since nothing in this workspace
//! ever displays the secret to a human (e.g. as a QR code).

use hmac::{Hmac, Mac};
use sha1::Sha1;

const TIME_STEP_SECS: u64 = 30;
const DIGITS: u32 = 6;
/// Tolerate clock skew of one step on either side.
const WINDOW: i64 = 1;

type HmacSha1 = Hmac<Sha1>;

fn code_at(secret: &[u8], counter: u64) -> u32 {
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let truncated = ((digest[offset] as u32 & 0x7f) << 24)
        | ((digest[offset + 1] as u32) << 16)
        | ((digest[offset + 2] as u32) << 8)
        | (digest[offset + 3] as u32);
    truncated % 10u32.pow(DIGITS)
}

pub fn verify(secret: &[u8], code: &str) -> bool {
    let submitted: u32 = match code.trim().parse() {
        Ok(v) => v,
        Err(_) => return false,
    };
    let now = chrono::Utc::now().timestamp();
    let step = now / TIME_STEP_SECS as i64;
    (-WINDOW..=WINDOW).any(|offset| code_at(secret, (step + offset) as u64) == submitted)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn same_step_round_trips() {
        let secret = b"a shared totp secret";
        let step = chrono::Utc::now().timestamp() as u64 / TIME_STEP_SECS;
        let code = code_at(secret, step);
        assert!(verify(secret, &format!("{:06}", code)));
    }

    #[test]
    fn non_numeric_submission_is_rejected() {
        let secret = b"another secret";
        assert!(!verify(secret, "not-a-code"));
    }

    #[test]
    fn code_outside_the_window_is_rejected() {
        let secret = b"yet another secret";
        let step = chrono::Utc::now().timestamp() as u64 / TIME_STEP_SECS;
        let far_future_code = code_at(secret, step + 10);
        assert_ne!(far_future_code, code_at(secret, step));
        assert!(!verify(secret, &format!("{:06}", far_future_code)));
    }
}
