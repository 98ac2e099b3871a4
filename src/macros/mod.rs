// `#[macro_export]` puts the macros at the crate root for the binary, the
// `pub(crate) use` below lets library modules import them as `macros::<name>!`

/// Parses an address literal, only for compile time constants
#[macro_export]
macro_rules! parse_address {
    ($addr:tt) => {
        $addr.parse::<alloy::primitives::Address>().unwrap()
    };
}

/// One aligned `key: value` output line with per-column colors
#[macro_export]
macro_rules! format_kv {
    ($a:expr, $k:expr, $ck:ident, $v:expr, $cv:ident) => {
        format!(
            "    {:align$}{}\n",
            format!("{}:", $k).$ck().bold(),
            format!("{}", $v).$cv(),
            align = $a
        )
    };
}

/// `format_kv!` for a gwei amount, shown in both gwei and eth
#[macro_export]
macro_rules! format_gwei {
    ($a:expr, $k:expr, $ck:ident, $v:expr, $cv:ident) => {
        $crate::format_kv!(
            $a,
            $k,
            $ck,
            format!(
                "{} gwei ({} eth)",
                $v,
                $crate::helpers::format_gwei_as_eth($v)
            ),
            $cv
        )
    };
}

pub(crate) use parse_address;
