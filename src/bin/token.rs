//! Issues a signed user token with the configured secret.
//!
//! Usage: `knowmark-token <user-uuid> [student|teacher|admin]`

use anyhow::{anyhow, Context};
use uuid::Uuid;

use knowmark_backend::resp::jwt::UserRoleToken;
use knowmark_backend::role::Role;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);

    let user: Uuid = args
        .next()
        .ok_or_else(|| anyhow!("missing user UUID argument"))?
        .parse()
        .context("user argument isn't a UUID")?;
    let role: Role = match args.next() {
        Some(it) => it.parse().map_err(|e: String| anyhow!(e))?,
        None => Role::default(),
    };

    let config = knowmark_backend::load_config().context("unable to load configuration")?;
    let token = UserRoleToken::for_user(user, role)
        .encode_jwt(&config.jwt_secret)
        .context("unable to sign token")?;

    println!("{}", token);
    Ok(())
}
