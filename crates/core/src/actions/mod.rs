pub mod action;
pub mod custom_factory_action;
pub mod deploy_contract_action;
pub mod deploy_proxy_action;
pub mod keyless_deploy_action;
pub mod meta_action;
pub mod preset_deploy_action;
pub mod sender_type;
pub mod throwaway_meta_action;
