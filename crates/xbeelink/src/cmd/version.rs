use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("xbeelink {}", env!("CARGO_PKG_VERSION"));
    if !args.extended {
        return Ok(SUCCESS);
    }

    println!(
        "target: {}",
        option_env!("XBEELINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("XBEELINK_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("host: {}/{}", std::env::consts::OS, std::env::consts::ARCH);
    println!(
        "features: bridge={}, async={}, cli=true",
        cfg!(feature = "bridge"),
        cfg!(feature = "async")
    );
    println!(
        "max_frame_data: {}",
        xbeelink_frame::MAX_FRAME_DATA_SIZE
    );
    println!(
        "default_baud: {}",
        xbeelink_transport::DEFAULT_BAUD_RATE
    );

    Ok(SUCCESS)
}
