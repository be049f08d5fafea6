use iab_consent::ParsedConsent;
use std::env::args;

fn main() {
    let s = args()
        .nth(1)
        .unwrap_or_else(|| "BONMj34ONMj34ABACDENALqAAAAAqACAD3AVkByAAAAAAAAAAAAAAAAAAAAAAAAAAAAA".to_string());

    let consent = s
        .parse::<ParsedConsent>()
        .expect("a valid consent string");

    #[cfg(feature = "serde")]
    println!("{}", serde_json::to_string_pretty(&consent).unwrap());

    #[cfg(not(feature = "serde"))]
    println!("{consent:#?}");
}
