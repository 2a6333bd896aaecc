use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use item_processor::{Item, ItemId, ItemStore, StoreError, StoreResult};

/// Upper bound on how long a gated call waits, so a broken test fails instead of hanging
const GATE_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocks store calls for one item until released
#[derive(Debug, Default)]
pub struct Gate {
    open: Mutex<bool>,
    signal: Condvar,
    waiting: AtomicUsize,
}

impl Gate {
    pub fn release(&self) {
        *self.open.lock() = true;
        self.signal.notify_all();
    }

    /// Number of callers currently parked on the gate
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    fn pass(&self) {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let mut open = self.open.lock();
        if !*open {
            self.signal.wait_while_for(&mut open, |open| !*open, GATE_TIMEOUT);
        }
        drop(open);
        self.waiting.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Behavior scripted for one item id
#[derive(Debug, Clone)]
pub enum Script {
    FailGet(StoreError),
    FailPut(StoreError),
    PanicOnGet,
    Gate(Arc<Gate>),
    Delay(Duration),
}

/// Scriptable store double that records calls and peak concurrency
#[derive(Debug, Default)]
pub struct MockStore {
    items: Mutex<HashMap<ItemId, Item>>,
    scripts: Mutex<HashMap<ItemId, Script>>,
    list_error: Mutex<Option<StoreError>>,
    get_calls: AtomicUsize,
    put_calls: AtomicUsize,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        let store = Self::new();
        {
            let mut map = store.items.lock();
            for item in items {
                map.insert(item.id, item);
            }
        }
        store
    }

    pub fn script(&self, id: ItemId, script: Script) -> &Self {
        self.scripts.lock().insert(id, script);
        self
    }

    /// Install a gate on `id` and return it
    pub fn gate(&self, id: ItemId) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.script(id, Script::Gate(Arc::clone(&gate)));
        gate
    }

    pub fn fail_listing(&self, error: StoreError) {
        *self.list_error.lock() = Some(error);
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// Most store calls observed in progress at the same time
    pub fn peak_active(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }

    pub fn stored(&self, id: ItemId) -> Option<Item> {
        self.items.lock().get(&id).cloned()
    }

    fn script_for(&self, id: ItemId) -> Option<Script> {
        self.scripts.lock().get(&id).cloned()
    }

    fn enter(&self) -> ActiveGuard<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now, Ordering::SeqCst);
        ActiveGuard { store: self }
    }
}

struct ActiveGuard<'a> {
    store: &'a MockStore,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.store.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ItemStore for MockStore {
    fn list_all_ids(&self) -> StoreResult<Vec<ItemId>> {
        if let Some(error) = self.list_error.lock().clone() {
            return Err(error);
        }
        let mut ids: Vec<ItemId> = self.items.lock().keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn get(&self, id: ItemId) -> StoreResult<Option<Item>> {
        let _active = self.enter();
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        match self.script_for(id) {
            Some(Script::FailGet(error)) => return Err(error),
            Some(Script::PanicOnGet) => panic!("store crashed reading item {id}"),
            Some(Script::Gate(gate)) => gate.pass(),
            Some(Script::Delay(delay)) => std::thread::sleep(delay),
            Some(Script::FailPut(_)) | None => {}
        }

        Ok(self.items.lock().get(&id).cloned())
    }

    fn put(&self, item: Item) -> StoreResult<Item> {
        let _active = self.enter();
        self.put_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(Script::FailPut(error)) = self.script_for(item.id) {
            return Err(error);
        }

        self.items.lock().insert(item.id, item.clone());
        Ok(item)
    }

    fn find_all(&self) -> StoreResult<Vec<Item>> {
        let mut items: Vec<Item> = self.items.lock().values().cloned().collect();
        items.sort_unstable_by_key(|item| item.id);
        Ok(items)
    }

    fn delete(&self, id: ItemId) -> StoreResult<()> {
        self.items.lock().remove(&id);
        Ok(())
    }
}
