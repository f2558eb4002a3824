//! 服务容器
//!
//! 每个架构层的对象图都由一个 `ServiceContainer` 承载：
//! - 按类型注册工厂，按类型解析实例
//! - 单例语义：每个类型只创建一次，之后共享同一个 `Arc`
//! - 可选父容器：本地未注册的类型回退到父容器解析
//! - 封存（seal）之后拒绝新的注册
//! - 循环依赖（同一线程递归，或多个线程互相等待）返回错误而不是死锁

use dashmap::DashMap;
use parking_lot::{const_mutex, Condvar, Mutex};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

type SharedService = Arc<dyn Any + Send + Sync>;

/// 工厂返回的错误类型
pub type FactoryError = Box<dyn std::error::Error + Send + Sync>;

/// 容器错误类型
#[derive(Debug)]
pub enum ContainerError {
    /// 服务未注册（本容器及父容器中均不存在）
    ServiceNotRegistered { type_name: &'static str },
    /// 类型转换失败
    TypeCastFailed { expected: String, actual: String },
    /// 服务创建失败
    CreationFailed { type_name: &'static str, reason: String },
    /// 解析过程中再次请求正在创建的同一服务
    CircularDependency { type_name: &'static str },
    /// 容器已封存，不再接受注册
    Sealed { type_name: &'static str },
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerError::ServiceNotRegistered { type_name } => {
                write!(f, "Service not registered: {}", type_name)
            }
            ContainerError::TypeCastFailed { expected, actual } => {
                write!(f, "Type cast failed: expected {}, got {}", expected, actual)
            }
            ContainerError::CreationFailed { type_name, reason } => {
                write!(f, "Service creation failed for {}: {}", type_name, reason)
            }
            ContainerError::CircularDependency { type_name } => {
                write!(f, "Circular dependency while resolving {}", type_name)
            }
            ContainerError::Sealed { type_name } => {
                write!(f, "Container is sealed, cannot register {}", type_name)
            }
        }
    }
}

impl std::error::Error for ContainerError {}

/// 服务工厂trait
pub trait ServiceFactory: Send + Sync {
    /// 创建服务实例
    fn create(&self, container: &ServiceContainer) -> Result<SharedService, ContainerError>;

    /// 获取服务类型名称（用于错误信息）
    fn service_type_name(&self) -> &'static str;
}

/// 函数式服务工厂
pub struct FnServiceFactory<F, T> {
    factory_fn: F,
    type_name: &'static str,
    _phantom: std::marker::PhantomData<fn() -> T>,
}

impl<F, T> FnServiceFactory<F, T> {
    pub fn new(factory_fn: F, type_name: &'static str) -> Self {
        Self {
            factory_fn,
            type_name,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<F, T> ServiceFactory for FnServiceFactory<F, T>
where
    F: Fn(&ServiceContainer) -> Result<T, FactoryError> + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    fn create(&self, container: &ServiceContainer) -> Result<SharedService, ContainerError> {
        let service = (self.factory_fn)(container).map_err(|e| ContainerError::CreationFailed {
            type_name: self.type_name,
            reason: e.to_string(),
        })?;
        Ok(Arc::new(service))
    }

    fn service_type_name(&self) -> &'static str {
        self.type_name
    }
}

/// 预先构造好的实例
struct InstanceFactory {
    instance: SharedService,
    type_name: &'static str,
}

impl ServiceFactory for InstanceFactory {
    fn create(&self, _container: &ServiceContainer) -> Result<SharedService, ContainerError> {
        Ok(self.instance.clone())
    }

    fn service_type_name(&self) -> &'static str {
        self.type_name
    }
}

/// 单个类型的实例状态
enum SlotState {
    Empty,
    Creating,
    Ready(SharedService),
}

/// 实例槽位：创建期间其他线程在 `ready` 上等待
struct InstanceSlot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl InstanceSlot {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Empty),
            ready: Condvar::new(),
        }
    }
}

type SlotKey = usize;

fn slot_key(slot: &Arc<InstanceSlot>) -> SlotKey {
    Arc::as_ptr(slot) as SlotKey
}

/// 等待图：哪个线程正在创建哪个槽位，哪个线程在等待哪个槽位
///
/// 所有容器共用一张图，工厂可以跨容器解析。
/// 加锁顺序固定为先槽位状态后等待图。
struct CreationGraph {
    creating: Vec<(SlotKey, ThreadId)>,
    waiting: Vec<(ThreadId, SlotKey)>,
}

impl CreationGraph {
    fn owner(&self, key: SlotKey) -> Option<ThreadId> {
        self.creating.iter().find(|(k, _)| *k == key).map(|(_, t)| *t)
    }

    fn waited_by(&self, thread: ThreadId) -> Option<SlotKey> {
        self.waiting.iter().find(|(t, _)| *t == thread).map(|(_, k)| *k)
    }

    /// 沿等待链走一遍，回到 `me` 说明等待会形成环
    fn closes_cycle(&self, key: SlotKey, me: ThreadId) -> bool {
        let mut current = key;
        for _ in 0..=self.waiting.len() {
            let Some(owner) = self.owner(current) else {
                return false;
            };
            if owner == me {
                return true;
            }
            match self.waited_by(owner) {
                Some(next) => current = next,
                None => return false,
            }
        }
        false
    }

    fn stop_waiting(&mut self, thread: ThreadId) {
        self.waiting.retain(|(t, _)| *t != thread);
    }

    fn finish_creating(&mut self, key: SlotKey) {
        self.creating.retain(|(k, _)| *k != key);
    }
}

static CREATION_GRAPH: Mutex<CreationGraph> = const_mutex(CreationGraph {
    creating: Vec::new(),
    waiting: Vec::new(),
});

/// 创建结束（包括工厂 panic）时写回状态并唤醒等待者
struct CreationGuard<'a> {
    slot: &'a InstanceSlot,
    key: SlotKey,
    created: Option<SharedService>,
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.slot.state.lock();
        *state = match self.created.take() {
            Some(service) => SlotState::Ready(service),
            None => SlotState::Empty,
        };
        CREATION_GRAPH.lock().finish_creating(self.key);
        drop(state);
        self.slot.ready.notify_all();
    }
}

/// 服务容器
#[derive(Clone)]
pub struct ServiceContainer {
    /// 服务工厂注册表
    factories: Arc<DashMap<TypeId, Arc<dyn ServiceFactory>>>,
    /// 单例实例缓存
    instances: Arc<DashMap<TypeId, Arc<InstanceSlot>>>,
    /// 父容器
    parent: Option<Arc<ServiceContainer>>,
    sealed: Arc<AtomicBool>,
    stats: Arc<InnerStats>,
}

/// 内部容器统计信息（原子计数器）
#[derive(Default)]
struct InnerStats {
    total_resolutions: AtomicUsize,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
}

impl ServiceContainer {
    /// 创建新的容器实例
    pub fn new() -> Self {
        Self {
            factories: Arc::new(DashMap::new()),
            instances: Arc::new(DashMap::new()),
            parent: None,
            sealed: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(InnerStats::default()),
        }
    }

    /// 创建以 `parent` 为回退的子容器
    pub fn with_parent(parent: &ServiceContainer) -> Self {
        Self {
            parent: Some(Arc::new(parent.clone())),
            ..Self::new()
        }
    }

    /// 注册服务工厂
    pub fn register<T, F>(&self, factory: F) -> Result<(), ContainerError>
    where
        F: Fn(&ServiceContainer) -> Result<T, FactoryError> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        self.ensure_open(type_name)?;

        let factory: Arc<dyn ServiceFactory> = Arc::new(FnServiceFactory::<F, T>::new(factory, type_name));
        self.factories.insert(TypeId::of::<T>(), factory);
        // 重新注册时丢弃旧实例
        self.instances.remove(&TypeId::of::<T>());
        Ok(())
    }

    /// 注册单例服务 - 便捷方法
    pub fn register_singleton<T, F>(&self, factory: F) -> Result<(), ContainerError>
    where
        F: Fn(&ServiceContainer) -> T + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        self.register(move |container| Ok(factory(container)))
    }

    /// 注册已经构造好的实例
    pub fn register_instance<T: Send + Sync + 'static>(&self, instance: T) -> Result<(), ContainerError> {
        let type_name = std::any::type_name::<T>();
        self.ensure_open(type_name)?;

        let factory: Arc<dyn ServiceFactory> = Arc::new(InstanceFactory {
            instance: Arc::new(instance),
            type_name,
        });
        self.factories.insert(TypeId::of::<T>(), factory);
        self.instances.remove(&TypeId::of::<T>());
        Ok(())
    }

    /// 解析服务 - 主要API
    ///
    /// 回退到父容器的解析只计入父容器的统计。
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ContainerError> {
        let type_id = TypeId::of::<T>();
        let type_name = std::any::type_name::<T>();

        let factory = match self.factories.get(&type_id) {
            Some(entry) => entry.value().clone(),
            None => {
                return match &self.parent {
                    Some(parent) => parent.resolve::<T>(),
                    None => Err(ContainerError::ServiceNotRegistered { type_name }),
                };
            }
        };
        self.stats.total_resolutions.fetch_add(1, Ordering::Relaxed);

        let slot = self
            .instances
            .entry(type_id)
            .or_insert_with(|| Arc::new(InstanceSlot::new()))
            .clone();
        let key = slot_key(&slot);
        let me = thread::current().id();

        let mut state = slot.state.lock();
        loop {
            match &*state {
                SlotState::Ready(service) => {
                    self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                    return downcast::<T>(service.clone());
                }
                SlotState::Empty => break,
                SlotState::Creating => {}
            }

            // 另一个线程正在创建，等待前先确认不会互相等待
            {
                let mut graph = CREATION_GRAPH.lock();
                if graph.closes_cycle(key, me) {
                    return Err(ContainerError::CircularDependency { type_name });
                }
                graph.waiting.push((me, key));
            }
            slot.ready.wait(&mut state);
            CREATION_GRAPH.lock().stop_waiting(me);
        }

        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);
        *state = SlotState::Creating;
        CREATION_GRAPH.lock().creating.push((key, me));
        drop(state);

        let mut guard = CreationGuard {
            slot: slot.as_ref(),
            key,
            created: None,
        };
        let service = factory.create(self)?;
        guard.created = Some(service.clone());
        drop(guard);
        downcast::<T>(service)
    }

    /// 检查服务是否已注册（包括父容器）
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.factories.contains_key(&TypeId::of::<T>())
            || self.parent.as_ref().is_some_and(|p| p.is_registered::<T>())
    }

    /// 本容器中注册的服务数量（不含父容器）
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// 封存容器，之后的注册全部失败
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// 获取容器统计信息
    pub fn get_stats(&self) -> ContainerStats {
        ContainerStats {
            total_resolutions: self.stats.total_resolutions.load(Ordering::Relaxed),
            cache_hits: self.stats.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.stats.cache_misses.load(Ordering::Relaxed),
        }
    }

    fn ensure_open(&self, type_name: &'static str) -> Result<(), ContainerError> {
        if self.is_sealed() {
            return Err(ContainerError::Sealed { type_name });
        }
        Ok(())
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("services", &self.factories.len())
            .field("has_parent", &self.parent.is_some())
            .field("sealed", &self.is_sealed())
            .finish()
    }
}

fn downcast<T: Send + Sync + 'static>(service: SharedService) -> Result<Arc<T>, ContainerError> {
    service.downcast::<T>().map_err(|actual| ContainerError::TypeCastFailed {
        expected: std::any::type_name::<T>().to_string(),
        actual: format!("{:?}", (*actual).type_id()),
    })
}

/// 容器统计信息
#[derive(Debug, Clone)]
pub struct ContainerStats {
    pub total_resolutions: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl ContainerStats {
    /// 获取总解析次数
    pub fn total(&self) -> usize {
        self.total_resolutions
    }

    /// 获取缓存命中率
    pub fn hit_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct TestService {
        id: usize,
    }

    struct Dependent {
        inner: Arc<TestService>,
    }

    #[test]
    fn test_singleton_service() {
        let container = ServiceContainer::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        container
            .register(move |_| {
                let id = counter_clone.fetch_add(1, Ordering::SeqCst);
                Ok(TestService { id })
            })
            .unwrap();

        let service1 = container.resolve::<TestService>().unwrap();
        let service2 = container.resolve::<TestService>().unwrap();

        assert_eq!(service1.id, service2.id);
        assert!(Arc::ptr_eq(&service1, &service2));
        assert_eq!(counter.load(Ordering::SeqCst), 1); // 只创建一次
    }

    #[test]
    fn test_service_not_registered() {
        let container = ServiceContainer::new();

        let result = container.resolve::<TestService>();

        assert!(matches!(result, Err(ContainerError::ServiceNotRegistered { .. })));
    }

    #[test]
    fn test_register_instance() {
        let container = ServiceContainer::new();
        container.register_instance(TestService { id: 7 }).unwrap();

        assert_eq!(container.resolve::<TestService>().unwrap().id, 7);
        assert!(container.is_registered::<TestService>());
    }

    #[test]
    fn test_factory_resolves_dependency() {
        let container = ServiceContainer::new();
        container.register_instance(TestService { id: 3 }).unwrap();
        container
            .register(|c| {
                Ok(Dependent {
                    inner: c.resolve::<TestService>()?,
                })
            })
            .unwrap();

        let dependent = container.resolve::<Dependent>().unwrap();
        assert_eq!(dependent.inner.id, 3);
    }

    #[test]
    fn test_parent_fallback() {
        let parent = ServiceContainer::new();
        parent.register_instance(TestService { id: 11 }).unwrap();

        let child = ServiceContainer::with_parent(&parent);
        child
            .register(|c| {
                Ok(Dependent {
                    inner: c.resolve::<TestService>()?,
                })
            })
            .unwrap();

        assert_eq!(child.resolve::<Dependent>().unwrap().inner.id, 11);
        assert!(child.is_registered::<TestService>());
        assert!(!parent.is_registered::<Dependent>());
        assert_eq!(child.len(), 1);
    }

    #[test]
    fn test_sealed_container_rejects_registration() {
        let container = ServiceContainer::new();
        container.register_instance(TestService { id: 1 }).unwrap();
        container.seal();

        let result = container.register_instance(42u32);
        assert!(matches!(result, Err(ContainerError::Sealed { .. })));
        // 已注册的服务仍可解析
        assert_eq!(container.resolve::<TestService>().unwrap().id, 1);
    }

    #[test]
    fn test_circular_dependency_detected() {
        let container = ServiceContainer::new();
        container
            .register(|c| {
                let inner = c.resolve::<Dependent>()?;
                Ok(Dependent { inner: inner.inner.clone() })
            })
            .unwrap();

        let result = container.resolve::<Dependent>();
        match result {
            Err(ContainerError::CreationFailed { reason, .. }) => {
                assert!(reason.contains("Circular dependency"));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    struct CycleA;
    struct CycleB;

    #[test]
    fn test_cross_thread_cycle_reports_error() {
        use std::sync::Barrier;

        let container = ServiceContainer::new();
        let barrier = Arc::new(Barrier::new(2));

        // 两个工厂都进入创建状态后再去解析对方
        let (barrier_a, first_a) = (barrier.clone(), Arc::new(AtomicBool::new(true)));
        container
            .register(move |c| {
                if first_a.swap(false, Ordering::SeqCst) {
                    barrier_a.wait();
                }
                c.resolve::<CycleB>()?;
                Ok(CycleA)
            })
            .unwrap();
        let (barrier_b, first_b) = (barrier.clone(), Arc::new(AtomicBool::new(true)));
        container
            .register(move |c| {
                if first_b.swap(false, Ordering::SeqCst) {
                    barrier_b.wait();
                }
                c.resolve::<CycleA>()?;
                Ok(CycleB)
            })
            .unwrap();

        let left = {
            let container = container.clone();
            std::thread::spawn(move || container.resolve::<CycleA>().map(|_| ()))
        };
        let right = {
            let container = container.clone();
            std::thread::spawn(move || container.resolve::<CycleB>().map(|_| ()))
        };

        for result in [left.join().unwrap(), right.join().unwrap()] {
            let err = result.unwrap_err();
            assert!(err.to_string().contains("Circular dependency"), "unexpected error: {}", err);
        }
    }

    #[test]
    fn test_waiters_share_instance_created_by_other_thread() {
        use std::sync::Barrier;

        let container = ServiceContainer::new();
        let created = Arc::new(AtomicUsize::new(0));
        let created_clone = created.clone();
        container
            .register(move |_| {
                std::thread::sleep(std::time::Duration::from_millis(20));
                Ok(TestService {
                    id: created_clone.fetch_add(1, Ordering::SeqCst),
                })
            })
            .unwrap();

        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let container = container.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    container.resolve::<TestService>().unwrap()
                })
            })
            .collect();

        let services: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(services.iter().all(|s| Arc::ptr_eq(s, &services[0])));
    }

    #[test]
    fn test_failed_creation_can_be_retried() {
        let container = ServiceContainer::new();
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        container
            .register(move |_| {
                if attempts_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("first attempt fails".into())
                } else {
                    Ok(TestService { id: 5 })
                }
            })
            .unwrap();

        assert!(container.resolve::<TestService>().is_err());
        assert_eq!(container.resolve::<TestService>().unwrap().id, 5);
    }

    #[test]
    fn test_container_stats() {
        let container = ServiceContainer::new();
        container.register(|_| Ok(TestService { id: 42 })).unwrap();

        for _ in 0..10 {
            let _ = container.resolve::<TestService>().unwrap();
        }

        let stats = container.get_stats();
        assert_eq!(stats.total(), 10);
        assert_eq!(stats.cache_hits, 9); // 第一次miss，后面都是hit
        assert_eq!(stats.cache_misses, 1);
        assert!(stats.hit_rate() > 0.8);
    }

    #[test]
    fn test_parent_fallback_counted_in_parent_only() {
        let parent = ServiceContainer::new();
        parent.register(|_| Ok(TestService { id: 1 })).unwrap();
        let child = ServiceContainer::with_parent(&parent);

        for _ in 0..4 {
            child.resolve::<TestService>().unwrap();
        }

        assert_eq!(child.get_stats().total(), 0);
        assert_eq!(child.get_stats().hit_rate(), 0.0);
        let stats = parent.get_stats();
        assert_eq!(stats.total(), 4);
        assert_eq!(stats.cache_hits, 3);
        assert_eq!(stats.cache_misses, 1);
    }
}
