mod common;

use classstub::consts::{ENV_NOT_IMPLEMENTED_CLASS, ENV_PRIVATIZE_RECORD_FIELDS, ENV_VERIFY_OUTPUT};
use classstub::{erase, Error, StubConfig};
use common::*;

// All environment manipulation lives in one test so parallel tests never race on it
#[test]
fn config_is_read_from_environment() {
    init_logger();
    std::env::remove_var(ENV_NOT_IMPLEMENTED_CLASS);
    std::env::remove_var(ENV_PRIVATIZE_RECORD_FIELDS);
    std::env::remove_var(ENV_VERIFY_OUTPUT);
    assert_eq!(StubConfig::from_env().unwrap(), StubConfig::default());

    std::env::set_var(ENV_NOT_IMPLEMENTED_CLASS, "java.lang.UnsupportedOperationException");
    std::env::set_var(ENV_PRIVATIZE_RECORD_FIELDS, "false");
    std::env::set_var(ENV_VERIFY_OUTPUT, "0");
    let config = StubConfig::from_env().unwrap();
    assert_eq!(config.not_implemented_class, "java/lang/UnsupportedOperationException");
    assert!(!config.privatize_record_fields);
    assert!(!config.verify_output);

    let mut model = class("p/A", OBJECT);
    model.methods.push(constructor("()V", OBJECT, "()V"));
    let stub = erase(&model, &config).unwrap();
    let ctor = body(&stub, "<init>", "()V");
    assert_eq!(ctor[ctor.len() - 4..], throw_tail("java/lang/UnsupportedOperationException")[..]);

    std::env::set_var(ENV_VERIFY_OUTPUT, "sometimes");
    assert!(matches!(StubConfig::from_env(), Err(Error::Config { .. })));

    std::env::remove_var(ENV_VERIFY_OUTPUT);
    std::env::set_var(ENV_NOT_IMPLEMENTED_CLASS, "");
    assert!(matches!(StubConfig::from_env(), Err(Error::Config { .. })));

    std::env::remove_var(ENV_NOT_IMPLEMENTED_CLASS);
    std::env::remove_var(ENV_PRIVATIZE_RECORD_FIELDS);
}
