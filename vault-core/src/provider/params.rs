use crate::error::{Result, VaultError};
use crate::models::{
    ContainerQuery, IlrAction, ItemRef, ProtectedItem, ProtectionPolicy, RecoveryPoint,
    RecoveryPointFilter, StorageAccount, VmIdentity,
};
use std::collections::HashMap;
use std::fmt;

/// 参数名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Item,
    ItemRef,
    Vm,
    Policy,
    PolicyName,
    RecoveryPoint,
    RecoveryPointId,
    RecoveryPointFilter,
    StorageAccount,
    ContainerQuery,
    IlrAction,
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// 参数值
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Item(ProtectedItem),
    ItemRef(ItemRef),
    Vm(VmIdentity),
    Policy(ProtectionPolicy),
    Text(String),
    RecoveryPoint(RecoveryPoint),
    RecoveryPointFilter(RecoveryPointFilter),
    StorageAccount(StorageAccount),
    ContainerQuery(ContainerQuery),
    IlrAction(IlrAction),
}

/// Provider 操作的参数集合
///
/// 由命令编排层构建并校验，Provider 只按名称取值。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderData {
    values: HashMap<ParamKey, ParamValue>,
}

macro_rules! accessor {
    ($name:ident, $opt:ident, $key:ident, $variant:ident, $ty:ty) => {
        pub fn $opt(&self) -> Option<&$ty> {
            match self.values.get(&ParamKey::$key) {
                Some(ParamValue::$variant(value)) => Some(value),
                _ => None,
            }
        }

        pub fn $name(&self) -> Result<&$ty> {
            self.$opt().ok_or_else(|| missing(ParamKey::$key))
        }
    };
}

fn missing(key: ParamKey) -> VaultError {
    VaultError::invalid_argument(key.to_string(), format!("缺少参数 {key}"))
}

impl ProviderData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: ParamKey, value: ParamValue) -> Self {
        self.values.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: ParamKey, value: ParamValue) {
        self.values.insert(key, value);
    }

    pub fn contains(&self, key: ParamKey) -> bool {
        self.values.contains_key(&key)
    }

    accessor!(item, item_opt, Item, Item, ProtectedItem);
    accessor!(vm, vm_opt, Vm, Vm, VmIdentity);
    accessor!(policy, policy_opt, Policy, Policy, ProtectionPolicy);
    accessor!(recovery_point, recovery_point_opt, RecoveryPoint, RecoveryPoint, RecoveryPoint);
    accessor!(storage_account, storage_account_opt, StorageAccount, StorageAccount, StorageAccount);
    accessor!(container_query, container_query_opt, ContainerQuery, ContainerQuery, ContainerQuery);
    accessor!(ilr_action, ilr_action_opt, IlrAction, IlrAction, IlrAction);

    pub fn text(&self, key: ParamKey) -> Result<&str> {
        match self.values.get(&key) {
            Some(ParamValue::Text(value)) => Ok(value),
            _ => Err(missing(key)),
        }
    }

    pub fn filter(&self) -> RecoveryPointFilter {
        match self.values.get(&ParamKey::RecoveryPointFilter) {
            Some(ParamValue::RecoveryPointFilter(filter)) => *filter,
            _ => RecoveryPointFilter::default(),
        }
    }

    /// 受保护项定位：优先使用完整的受保护项，其次是显式定位信息
    pub fn item_ref(&self) -> Result<ItemRef> {
        if let Some(item) = self.item_opt() {
            return Ok(item.item_ref());
        }
        match self.values.get(&ParamKey::ItemRef) {
            Some(ParamValue::ItemRef(item_ref)) => Ok(item_ref.clone()),
            _ => Err(missing(ParamKey::Item)),
        }
    }

    /// 恢复点 ID：优先使用完整的恢复点
    pub fn recovery_point_id(&self) -> Result<&str> {
        match self.recovery_point_opt() {
            Some(point) => Ok(&point.name),
            None => self.text(ParamKey::RecoveryPointId),
        }
    }
}
