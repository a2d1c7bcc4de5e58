use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand_core::OsRng;
use rand_core::RngCore;

/// Bytes of OS randomness behind each opaque token.
pub const TOKEN_BYTES: usize = 32;

/// Generate an opaque, URL-safe random token.
///
/// 32 bytes from the OS CSPRNG encoded as unpadded base64url (43 characters).
/// Collisions are treated as impossible; callers do not check the store for
/// duplicates. Used for refresh tokens and OAuth `state` values.
pub fn generate_opaque_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
