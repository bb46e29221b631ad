use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

use tracing::debug;
use windows::Win32::System::Com::CoUninitialize;
use wmi::{COMLibrary, Variant, WMIConnection};

use crate::core::error::ProviderError;
use crate::core::result::FieldValue;
use crate::core::session::{Provider, Session};

type WmiRow = Rc<HashMap<String, Variant>>;

pub struct NativeProvider {
    namespace: String,
}

impl NativeProvider {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
        }
    }
}

impl Provider for NativeProvider {
    type Session = WmiSession;

    fn open(&self) -> Result<WmiSession, ProviderError> {
        let com = COMLibrary::new()
            .map_err(|e| ProviderError::Connection(format!("COM initialisation: {}", e)))?;
        // Balances the CoInitializeEx above, including when the connect below fails.
        let apartment = ComApartment::entered();
        let conn = WMIConnection::with_namespace_path(&self.namespace, com).map_err(|e| {
            ProviderError::Connection(format!("ConnectServer({}): {}", self.namespace, e))
        })?;
        debug!("Connected to WMI namespace {}", self.namespace);
        Ok(WmiSession {
            conn,
            _apartment: apartment,
        })
    }
}

/// One successful `CoInitializeEx` on the current thread. `wmi` never calls
/// `CoUninitialize`, so this guard does it on drop.
struct ComApartment {
    _thread_bound: PhantomData<*mut ()>,
}

impl ComApartment {
    fn entered() -> Self {
        Self {
            _thread_bound: PhantomData,
        }
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
        debug!("COM apartment released");
    }
}

/// Dropping the session releases the service handle and then the COM apartment.
/// Field order matters: `conn` must drop before `_apartment`.
pub struct WmiSession {
    conn: WMIConnection,
    _apartment: ComApartment,
}

impl Session for WmiSession {
    type ResultSet = Vec<WmiRow>;
    type Row = WmiRow;

    fn execute(&mut self, query: &str) -> Result<Self::ResultSet, ProviderError> {
        let rows: Vec<HashMap<String, Variant>> = self
            .conn
            .raw_query(query)
            .map_err(|e| ProviderError::Query(e.to_string()))?;
        Ok(rows.into_iter().map(Rc::new).collect())
    }

    fn count(&mut self, results: &Self::ResultSet) -> Result<usize, ProviderError> {
        Ok(results.len())
    }

    fn row_at(
        &mut self,
        results: &Self::ResultSet,
        index: usize,
    ) -> Result<Self::Row, ProviderError> {
        results
            .get(index)
            .cloned()
            .ok_or_else(|| ProviderError::Query(format!("ItemIndex({}) out of range", index)))
    }

    fn field(&mut self, row: &Self::Row, name: &str) -> Result<FieldValue, ProviderError> {
        lookup(row, name)
            .map(convert)
            .ok_or_else(|| ProviderError::Property {
                field: name.to_string(),
                message: "property not present on the returned object".into(),
            })
    }
}

// WMI property names are case-insensitive.
fn lookup<'a>(row: &'a HashMap<String, Variant>, name: &str) -> Option<&'a Variant> {
    row.get(name).or_else(|| {
        row.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}

fn convert(value: &Variant) -> FieldValue {
    match value {
        Variant::Empty | Variant::Null => FieldValue::Null,
        Variant::String(s) => FieldValue::Text(s.clone()),
        Variant::Bool(b) => FieldValue::Bool(*b),
        Variant::I1(n) => FieldValue::Int(i64::from(*n)),
        Variant::I2(n) => FieldValue::Int(i64::from(*n)),
        Variant::I4(n) => FieldValue::Int(i64::from(*n)),
        Variant::I8(n) => FieldValue::Int(*n),
        Variant::UI1(n) => FieldValue::UInt(u64::from(*n)),
        Variant::UI2(n) => FieldValue::UInt(u64::from(*n)),
        Variant::UI4(n) => FieldValue::UInt(u64::from(*n)),
        Variant::UI8(n) => FieldValue::UInt(*n),
        Variant::R4(n) => FieldValue::Float(f64::from(*n)),
        Variant::R8(n) => FieldValue::Float(*n),
        Variant::Array(items) => FieldValue::List(items.iter().map(convert).collect()),
        _ => FieldValue::Null,
    }
}
