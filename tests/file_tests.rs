//! INI store accessor tests

use ratticweb_settings::config::file::parse_bool;
use ratticweb_settings::{AppError, ConfStore};

const DEFAULTS: &str = r#"
[ratticweb]
timezone = UTC
hostname = localhost
loglevel = ERROR

[email]
host = localhost
usetls = false
"#;

const LOCAL: &str = r#"
[ratticweb]
hostname = vault.example.com

[email]
usetls = On
"#;

#[test]
fn test_absent_option_returns_default() {
    let store = ConfStore::from_ini_layers(&[DEFAULTS, LOCAL]).unwrap();

    let cases = [
        ("ratticweb", "urlroot", "/"),
        ("ratticweb", "passwordexpirydays", ""),
        ("email", "from_email", "noreply@example.com"),
        ("backup", "dir", "/var/backups"),
        ("goauth2", "client_id", "fallback-id"),
    ];
    for (section, option, default) in cases {
        assert_eq!(store.get_or(section, option, default), default, "[{}] {}", section, option);
        assert_eq!(store.get_opt(section, option), None);
    }
}

#[test]
fn test_present_option_exact_value() {
    let store = ConfStore::from_ini_layers(&[DEFAULTS]).unwrap();
    assert_eq!(store.get_or("ratticweb", "timezone", "Europe/Paris"), "UTC");
    assert_eq!(store.get("ratticweb", "loglevel").unwrap(), "ERROR");
}

#[test]
fn test_later_layer_overrides() {
    let store = ConfStore::from_ini_layers(&[DEFAULTS, LOCAL]).unwrap();

    assert_eq!(store.get("ratticweb", "hostname").unwrap(), "vault.example.com");
    // Keys only in the earlier layer survive the merge
    assert_eq!(store.get("ratticweb", "timezone").unwrap(), "UTC");
    assert!(store.get_bool_or("email", "usetls", false).unwrap());

    let store = ConfStore::from_ini_layers(&[LOCAL, DEFAULTS]).unwrap();
    assert_eq!(store.get("ratticweb", "hostname").unwrap(), "localhost");
}

#[test]
fn test_bool_accessor() {
    let store = ConfStore::from_ini_layers(&[
        "[flags]\na = yes\nb = OFF\nc = 1\nd = maybe\n",
    ])
    .unwrap();

    assert!(store.get_bool("flags", "a").unwrap());
    assert!(!store.get_bool("flags", "b").unwrap());
    assert!(store.get_bool_or("flags", "c", false).unwrap());
    assert!(store.get_bool_or("flags", "missing", true).unwrap());
    assert!(!store.get_bool_or("flags", "missing", false).unwrap());

    let err = store.get_bool_or("flags", "d", false).unwrap_err();
    match err {
        AppError::InvalidBool { section, option, value } => {
            assert_eq!(section, "flags");
            assert_eq!(option, "d");
            assert_eq!(value, "maybe");
        }
        other => panic!("Expected invalid boolean error, got {:?}", other),
    }
}

#[test]
fn test_canonical_bool_tokens() {
    for token in ["1", "yes", "true", "on"] {
        assert_eq!(parse_bool(token), Some(true));
        assert_eq!(parse_bool(&token.to_uppercase()), Some(true));
    }
    for token in ["0", "no", "false", "off"] {
        assert_eq!(parse_bool(token), Some(false));
        assert_eq!(parse_bool(&token.to_uppercase()), Some(false));
    }
    assert_eq!(parse_bool("t"), None);
    assert_eq!(parse_bool("-1"), None);
}

#[test]
fn test_required_lookup_errors() {
    let store = ConfStore::from_ini_layers(&[DEFAULTS]).unwrap();

    assert!(matches!(
        store.get("ratticweb", "secretkey"),
        Err(AppError::MissingOption { .. })
    ));
    assert!(matches!(
        store.get_int::<u64>("ratticweb", "hostname"),
        Err(AppError::InvalidInt { .. })
    ));
}

#[test]
fn test_int_accessor() {
    let store = ConfStore::from_ini_layers(&["[n]\nsize = 262144\nneg = -5\n"]).unwrap();
    assert_eq!(store.get_int::<u64>("n", "size").unwrap(), 262144);
    assert_eq!(store.get_int::<i64>("n", "neg").unwrap(), -5);
    assert!(store.get_int::<u64>("n", "neg").is_err());
}

#[test]
fn test_structure_queries() {
    let ldap = "[ldap]\nuri = ldap://localhost\n";
    let store = ConfStore::from_ini_layers(&[DEFAULTS, ldap]).unwrap();

    assert!(store.has_section("ldap"));
    assert!(store.has_section("LDAP"));
    assert!(!store.has_section("goauth2"));
    assert!(store.has_option("ldap", "uri"));
    assert!(!store.has_option("ldap", "groupfilter"));
    assert_eq!(store.sections(), vec!["email", "ldap", "ratticweb"]);
}

#[test]
fn test_option_outside_section_rejected() {
    let result = ConfStore::from_ini_layers(&["orphan = 1\n[ratticweb]\ndebug = false\n"]);
    assert!(matches!(result, Err(AppError::Load(_))));
}

#[test]
fn test_values_kept_verbatim() {
    let store = ConfStore::from_ini_layers(&[
        r#"
[ldap]
userbase = cn=Smith\, John,ou=people,dc=example,dc=com
bindpw = "quoted pass"

[filepaths]
static = C:\temp\new
secret = 3k#x;9\q
"#,
    ])
    .unwrap();

    assert_eq!(
        store.get("ldap", "userbase").unwrap(),
        r"cn=Smith\, John,ou=people,dc=example,dc=com"
    );
    assert_eq!(store.get("ldap", "bindpw").unwrap(), r#""quoted pass""#);
    // No TAB or newline spliced in
    assert_eq!(store.get("filepaths", "static").unwrap(), r"C:\temp\new");
    assert_eq!(store.get("filepaths", "secret").unwrap(), r"3k#x;9\q");
}

#[test]
fn test_continuation_lines_join_value() {
    let store = ConfStore::from_ini_layers(&[
        "[email]\nrecipients = a@x.com\n  b@y.com\n\tc@z.com\nhost = localhost\n",
    ])
    .unwrap();

    assert_eq!(store.get("email", "recipients").unwrap(), "a@x.com\nb@y.com\nc@z.com");
    assert_eq!(store.get("email", "host").unwrap(), "localhost");
}

#[test]
fn test_continuation_survives_layering() {
    let store = ConfStore::from_ini_layers(&[
        "[email]\nrecipients = a@x.com\n",
        "[email]\nrecipients = b@y.com\n    c@z.com\n",
    ])
    .unwrap();
    assert_eq!(store.get("email", "recipients").unwrap(), "b@y.com\nc@z.com");
}

#[test]
fn test_dotted_section_name_is_one_section() {
    let store = ConfStore::from_ini_layers(&[
        "[goauth2.x]\nclient_id = abc\n",
        "[goauth2.x]\ndomain = example.com\n",
    ])
    .unwrap();

    assert!(store.has_section("goauth2.x"));
    assert!(!store.has_section("goauth2"));
    assert_eq!(store.get("goauth2.x", "client_id").unwrap(), "abc");
    assert_eq!(store.get("goauth2.x", "domain").unwrap(), "example.com");
}

#[test]
fn test_option_outside_section_names_option() {
    let err = ConfStore::from_ini_layers(&["orphan = 1\n[ratticweb]\n"]).unwrap_err();
    assert!(err.to_string().contains("'orphan'"), "{}", err);
}
