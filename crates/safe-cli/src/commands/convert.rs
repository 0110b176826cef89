use safe_core::convert::{convert, ConversionRequest, Direction};
use safe_core::FileRegistry;

use crate::app::{unlock, AppContext};
use crate::cli::ConvertArgs;

pub fn handle_convert(ctx: &AppContext, args: &ConvertArgs) -> anyhow::Result<()> {
    let mut store = ctx.open_store()?;
    let password = unlock(&store, ctx.interactive())?;

    let direction = if args.encrypt {
        Direction::Encrypt
    } else if args.decrypt {
        Direction::Decrypt
    } else {
        Direction::infer(&args.file)
    };
    let mut request = ConversionRequest::new(&args.file, direction).with_overwrite(args.overwrite);
    if let Some(name) = &args.name {
        request = request.with_target(name);
    }

    let written = convert(&request, &password)?;

    // Rotation must be able to find every SafeFile later.
    if direction == Direction::Encrypt {
        let tracked = std::fs::canonicalize(&written)?;
        store.track(&tracked)?;
    }

    if !ctx.quiet() {
        let verb = match direction {
            Direction::Encrypt => "Encrypted",
            Direction::Decrypt => "Decrypted",
        };
        println!("{} {} -> {}", verb, args.file.display(), written.display());
    }
    Ok(())
}
